/// Engine knobs. Snapshot logging is off by default; when enabled, every
/// improving step writes `{log_prefix}{engine_rank}_{step}_sol.json`.
#[derive(Clone, Debug)]
pub struct LocalSearchParams {
    pub log_solutions: bool,
    pub log_prefix: String,
}

impl Default for LocalSearchParams {
    fn default() -> Self {
        Self {
            log_solutions: false,
            log_prefix: String::from("debug_"),
        }
    }
}
