use crate::query::options::QueryOptions;

/// Sub-lists for every `in(...)` filter that would overflow the URL budget.
///
/// Combinations are visited in odometer order, last key fastest. A query
/// with no oversized filters has exactly one (empty) combination.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    keys: Vec<(String, Vec<String>)>,
    position: Vec<usize>,
}

impl ChunkPlan {
    pub fn from_options(options: &QueryOptions, max_len: usize) -> Self {
        let keys: Vec<(String, Vec<String>)> = options
            .iter()
            .filter_map(|(key, value)| split_in_list(value, max_len).map(|chunks| (key.to_string(), chunks)))
            .collect();
        let position = vec![0; keys.len()];
        Self { keys, position }
    }

    pub fn is_chunked(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Total number of request combinations.
    pub fn len(&self) -> usize {
        self.keys.iter().map(|(_, chunks)| chunks.len()).product()
    }

    /// Options with the active sub-list substituted for each chunked key.
    pub fn apply(&self, options: &QueryOptions) -> QueryOptions {
        let mut options = options.clone();
        for ((key, chunks), idx) in self.keys.iter().zip(&self.position) {
            options.insert(key.as_str(), &chunks[*idx]);
        }
        options
    }

    /// Move to the next combination. Returns false when none remain.
    pub fn advance(&mut self) -> bool {
        for i in (0..self.keys.len()).rev() {
            if self.position[i] + 1 < self.keys[i].1.len() {
                self.position[i] += 1;
                for later in self.position.iter_mut().skip(i + 1) {
                    *later = 0;
                }
                return true;
            }
        }
        false
    }
}

/// Split an `in(a,b,...)` value into several `in(...)` values each at most
/// `max_len` once URL-encoded. `None` when the value is not an in-list or
/// already fits. A single item longer than the budget gets its own chunk.
pub fn split_in_list(value: &str, max_len: usize) -> Option<Vec<String>> {
    let inner = value.strip_prefix("in(")?.strip_suffix(')')?;
    if encoded_len(value) <= max_len {
        return None;
    }

    // "in(" + ")" encode to "in%28" + "%29"
    let overhead = encoded_len("in()");
    let separator = encoded_len(",");

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = overhead;
    for item in inner.split(',') {
        let item_len = encoded_len(item);
        let added = if current.is_empty() { item_len } else { separator + item_len };
        if !current.is_empty() && current_len + added > max_len {
            chunks.push(format!("in({})", current.join(",")));
            current.clear();
            current_len = overhead;
            current.push(item);
            current_len += item_len;
        } else {
            current.push(item);
            current_len += added;
        }
    }
    if !current.is_empty() {
        chunks.push(format!("in({})", current.join(",")));
    }
    Some(chunks)
}

/// Length after `application/x-www-form-urlencoded` encoding.
fn encoded_len(s: &str) -> usize {
    s.bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'*' | b'-' | b'.' | b'_' | b' ' => 1,
            _ => 3,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::options::in_list;

    #[test]
    fn short_or_plain_values_are_left_alone() {
        assert_eq!(split_in_list("in(1,2,3)", 1950), None);
        assert_eq!(split_in_list("eq(null)", 5), None);
        assert_eq!(split_in_list("in(1,2", 1), None);
    }

    #[test]
    fn chunks_respect_budget_and_keep_every_item_in_order() {
        let ids: Vec<u32> = (100_000..101_000).collect();
        let value = in_list(&ids);
        let chunks = split_in_list(&value, 200).unwrap();
        assert!(chunks.len() > 1);

        let mut seen = Vec::new();
        for chunk in &chunks {
            assert!(encoded_len(chunk) <= 200, "{} too long", chunk);
            let inner = chunk.strip_prefix("in(").unwrap().strip_suffix(')').unwrap();
            seen.extend(inner.split(',').map(|s| s.parse::<u32>().unwrap()));
        }
        assert_eq!(seen, ids);
    }

    #[test]
    fn oversized_single_item_gets_own_chunk() {
        let big = "x".repeat(50);
        let value = format!("in(a,{},b)", big);
        let chunks = split_in_list(&value, 20).unwrap();
        assert_eq!(chunks, vec!["in(a)".to_string(), format!("in({})", big), "in(b)".to_string()]);
    }

    #[test]
    fn plan_walks_combinations_in_odometer_order() {
        let options = QueryOptions::new()
            .with("a", "in(1,2,3,4)")
            .with("b", "in(7,8,9)")
            .with("state", "TX");
        // each item plus overhead: "in%28" + "1" + "%29" = 9, two items = 13
        let mut plan = ChunkPlan::from_options(&options, 13);
        assert!(plan.is_chunked());
        assert_eq!(plan.len(), 4);

        let mut seen = Vec::new();
        loop {
            let applied = plan.apply(&options);
            assert_eq!(applied.get("state"), Some("TX"));
            seen.push((applied.get("a").unwrap().to_string(), applied.get("b").unwrap().to_string()));
            if !plan.advance() {
                break;
            }
        }
        assert_eq!(
            seen,
            vec![
                ("in(1,2)".into(), "in(7,8)".into()),
                ("in(1,2)".into(), "in(9)".into()),
                ("in(3,4)".into(), "in(7,8)".into()),
                ("in(3,4)".into(), "in(9)".into()),
            ]
        );
    }

    #[test]
    fn unchunked_plan_has_single_combination() {
        let options = QueryOptions::new().with("state", "TX");
        let mut plan = ChunkPlan::from_options(&options, 1950);
        assert!(!plan.is_chunked());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.apply(&options), options);
        assert!(!plan.advance());
    }
}
