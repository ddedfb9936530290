use tracing::trace;

// Trace-based counters; the Prometheus endpoint renders whatever a recorder
// collects, these only emit events.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "trailhead.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn view_computed(route: &'static str, elapsed_us: u128, visible: usize) {
    trace!(
        target = "trailhead.metrics",
        route = route,
        elapsed_us = elapsed_us as u64,
        visible = visible as u64,
        "catalog_view_computed"
    );
}

pub fn catalog_refreshed(source: &'static str, loaded: usize, rejected: usize) {
    trace!(
        target = "trailhead.metrics",
        source = source,
        loaded = loaded as u64,
        rejected = rejected as u64,
        "catalog_refreshed"
    );
}
