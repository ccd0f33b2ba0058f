//! Query - filter, ordering and paging over one declared type.

use std::cmp::Ordering;
use std::fmt;

type Filter<'q, T> = Box<dyn Fn(&T) -> bool + Send + Sync + 'q>;
type Order<'q, T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync + 'q>;

/// A query over all view models of one declared type.
///
/// In-process backends evaluate it by linear scan over a snapshot; the
/// document backend hands it to the store, which evaluates the filter
/// against its index and applies its own result cap.
///
/// ```ignore
/// let page = reader.query(
///     &Query::new()
///         .filter(|card: &PlayerCard| card.score > 10)
///         .order_by_key(|card| card.name.clone())
///         .skip(20)
///         .take(10),
/// )?;
/// ```
pub struct Query<'q, T> {
    filter: Option<Filter<'q, T>>,
    order: Option<Order<'q, T>>,
    skip: usize,
    take: Option<usize>,
    wait_for_non_stale_results: bool,
}

impl<'q, T: 'q> Default for Query<'q, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'q, T: 'q> Query<'q, T> {
    /// A query matching every view model of the type.
    pub fn new() -> Self {
        Query {
            filter: None,
            order: None,
            skip: 0,
            take: None,
            wait_for_non_stale_results: false,
        }
    }

    /// Restrict results to entities matching `predicate`.
    ///
    /// Calling `filter` again narrows further (both predicates must hold).
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'q,
    {
        let combined: Filter<'q, T> = match self.filter.take() {
            Some(previous) => Box::new(move |entity: &T| previous(entity) && predicate(entity)),
            None => Box::new(predicate),
        };
        self.filter = Some(combined);
        self
    }

    /// Sort results with a comparator. The sort is stable.
    pub fn order_by<F>(mut self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'q,
    {
        self.order = Some(Box::new(compare));
        self
    }

    /// Sort results ascending by a derived key.
    pub fn order_by_key<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'q,
    {
        self.order_by(move |a, b| key(a).cmp(&key(b)))
    }

    pub fn skip(mut self, count: usize) -> Self {
        self.skip = count;
        self
    }

    pub fn take(mut self, count: usize) -> Self {
        self.take = Some(count);
        self
    }

    /// Ask the backing store to catch its index up to all writes committed
    /// before the query runs. In-process backends are never stale and ignore
    /// the flag.
    pub fn wait_for_non_stale_results(mut self) -> Self {
        self.wait_for_non_stale_results = true;
        self
    }

    pub fn skip_count(&self) -> usize {
        self.skip
    }

    pub fn take_count(&self) -> Option<usize> {
        self.take
    }

    pub fn waits_for_non_stale_results(&self) -> bool {
        self.wait_for_non_stale_results
    }

    pub fn is_ordered(&self) -> bool {
        self.order.is_some()
    }

    /// Whether `entity` passes the filter. No filter matches everything.
    pub fn matches(&self, entity: &T) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(entity))
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.order.as_ref().map_or(Ordering::Equal, |order| order(a, b))
    }

    /// Filter, order, skip and take `items` in memory.
    pub fn apply(&self, items: Vec<T>) -> Vec<T> {
        self.apply_by(items, |item| item)
    }

    /// Same as [`apply`](Self::apply) for rows that wrap a `T`, such as
    /// stored documents carrying their id and version.
    pub fn apply_by<U, P>(&self, items: Vec<U>, project: P) -> Vec<U>
    where
        P: Fn(&U) -> &T,
    {
        let mut rows: Vec<U> = items
            .into_iter()
            .filter(|row| self.matches(project(row)))
            .collect();

        if let Some(order) = &self.order {
            rows.sort_by(|a, b| order(project(a), project(b)));
        }

        let rows = rows.into_iter().skip(self.skip);
        match self.take {
            Some(take) => rows.take(take).collect(),
            None => rows.collect(),
        }
    }
}

impl<'q, T> fmt::Debug for Query<'q, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filtered", &self.filter.is_some())
            .field("ordered", &self.order.is_some())
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("wait_for_non_stale_results", &self.wait_for_non_stale_results)
            .finish()
    }
}
