use parking_lot::{const_mutex, Mutex};
use snowflake::SnowflakeIdBucket;

static ID_GENERATOR: Mutex<Option<SnowflakeIdBucket>> = const_mutex(None);

/// Initialize the snowflake ID generator.
///
/// `machine_id`: machine identifier (0-31)
/// `node_id`: node identifier (0-31)
pub fn init(machine_id: i32, node_id: i32) {
    *ID_GENERATOR.lock() = Some(SnowflakeIdBucket::new(machine_id, node_id));
}

/// Generate a snowflake ID as a decimal string.
///
/// Falls back to machine 1 / node 1 when [`init`] was never called.
pub fn next_id() -> String {
    let mut gen = ID_GENERATOR.lock();
    let bucket = gen.get_or_insert_with(|| SnowflakeIdBucket::new(1, 1));
    bucket.get_id().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_from_concurrent_writers_never_collide() {
        let ids: Vec<String> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| (0..500).map(|_| next_id()).collect::<Vec<_>>()))
                .collect();
            workers
                .into_iter()
                .flat_map(|w| w.join().unwrap())
                .collect()
        });

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn ids_parse_and_grow_in_issue_order() {
        let first: i64 = next_id().parse().unwrap();
        let second: i64 = next_id().parse().unwrap();
        assert!(first > 0);
        assert!(second > first, "{second} should sort after {first}");
    }
}
