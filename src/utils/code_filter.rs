use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real headcount.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static CODE_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Check if an employee code might exist (false positives possible)
pub fn might_exist(code: &str) -> bool {
    let code = normalize(code);
    CODE_FILTER
        .read()
        .expect("employee code filter poisoned")
        .contains(&code)
}

/// Insert a single employee code into the filter
pub fn insert(code: &str) {
    let code = normalize(code);
    CODE_FILTER
        .write()
        .expect("employee code filter poisoned")
        .add(&code);
}

/// Remove an employee code from the filter
pub fn remove(code: &str) {
    let code = normalize(code);
    CODE_FILTER
        .write()
        .expect("employee code filter poisoned")
        .remove(&code);
}

/// Warm up the code filter using streaming + batching
pub async fn warmup_code_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT employee_code FROM employees").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (code,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&code));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Employee code filter warmup complete: {} codes", total);
    Ok(())
}

/// Insert a batch of normalized codes
fn insert_batch(codes: &[String]) {
    let mut filter = CODE_FILTER.write().expect("employee code filter poisoned");

    for code in codes {
        filter.add(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_might_exist() {
        insert("tst-901");
        assert!(might_exist("TST-901"));
        assert!(might_exist(" tst-901 "));
    }

    #[test]
    fn removed_code_stops_matching() {
        insert("TST-902");
        remove("TST-902");
        assert!(!might_exist("TST-902"));
    }
}
