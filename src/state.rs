use crate::aggregate::AggregationLimits;
use crate::storage::JsonStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub limits: AggregationLimits,
}

impl AppState {
    pub fn new(store: JsonStore, limits: AggregationLimits) -> Self {
        Self {
            store: Arc::new(store),
            limits,
        }
    }
}
