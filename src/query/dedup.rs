/// Sort ascending and drop duplicates
pub fn dedup(mut results: Vec<String>) -> Vec<String> {
    results.sort_unstable();
    results.dedup();
    results
}
