mod aggregation;
mod backoff;
mod cache_time;
