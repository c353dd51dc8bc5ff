use super::process::ProcessRecord;

/// Every field is optional; an absent field places no constraint on its axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    pub name: Option<String>,
    pub cmdline: Option<String>,
    pub mem_low_mb: Option<f64>,
    pub mem_high_mb: Option<f64>,
    pub top_n: Option<usize>,
}

impl FilterCriteria {
    pub fn is_unconstrained(&self) -> bool {
        *self == FilterCriteria::default()
    }

    fn matches(&self, record: &ProcessRecord) -> bool {
        if let Some(ref name) = self.name
            && !contains_ignore_case(&record.name, name)
        {
            return false;
        }
        if let Some(ref cmdline) = self.cmdline
            && !contains_ignore_case(&record.command_line(), cmdline)
        {
            return false;
        }
        let mb = record.memory_mb();
        if self.mem_low_mb.is_some_and(|low| mb < low) {
            return false;
        }
        if self.mem_high_mb.is_some_and(|high| mb > high) {
            return false;
        }
        true
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankBy {
    /// CPU percent over the sampling window.
    #[default]
    Percent,
    /// Accumulated CPU time since process start.
    Time,
}

pub fn filter(records: Vec<ProcessRecord>, criteria: &FilterCriteria) -> Vec<ProcessRecord> {
    let matched: Vec<ProcessRecord> = records
        .into_iter()
        .filter(|r| criteria.matches(r))
        .collect();
    match criteria.top_n {
        Some(n) => top_by_cpu(matched, n),
        None => matched,
    }
}

/// Highest CPU percent first. Stable, so equal entries keep enumeration order.
pub fn top_by_cpu(mut records: Vec<ProcessRecord>, n: usize) -> Vec<ProcessRecord> {
    records.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
    records.truncate(n);
    records
}

pub fn top_by_cpu_time(mut records: Vec<ProcessRecord>, n: usize) -> Vec<ProcessRecord> {
    records.sort_by(|a, b| b.cpu_time_ms.cmp(&a.cpu_time_ms));
    records.truncate(n);
    records
}

pub fn top_by(records: Vec<ProcessRecord>, n: usize, rank: RankBy) -> Vec<ProcessRecord> {
    match rank {
        RankBy::Percent => top_by_cpu(records, n),
        RankBy::Time => top_by_cpu_time(records, n),
    }
}

/// Inclusive on both bounds, in megabytes.
pub fn in_memory_range(records: Vec<ProcessRecord>, low_mb: f64, high_mb: f64) -> Vec<ProcessRecord> {
    records
        .into_iter()
        .filter(|r| {
            let mb = r.memory_mb();
            low_mb <= mb && mb <= high_mb
        })
        .collect()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
