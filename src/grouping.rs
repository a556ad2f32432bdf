use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Files sharing a (ratio, videoName) pair number a common sequence.
pub type GroupKey = (String, String);

/// Assign each file its zero-based position within its group, in encounter
/// order over the whole batch. The first file seen for a key gets 0, the
/// next 1, and so on; this index drives the name suffix.
pub fn assign_group_indices(keys: &[GroupKey]) -> Vec<usize> {
    let mut counters: HashMap<&GroupKey, usize> = HashMap::new();
    keys.iter()
        .map(|key| {
            let counter = counters.entry(key).or_insert(0);
            let index = *counter;
            *counter += 1;
            index
        })
        .collect()
}

/// Suffix policy: the first file in a group gets no suffix, the second
/// gets "2", the third "3", ...
pub fn suffix_for_index(index: usize) -> String {
    if index == 0 {
        String::new()
    } else {
        (index + 1).to_string()
    }
}

/// Case-folded lookup key for a destination path.
pub fn destination_key(path: &Path) -> String {
    path.to_string_lossy().to_ascii_lowercase()
}

/// Render a name for `start_index` and walk forward past any name already
/// occupied on disk or claimed by an earlier file of the same batch
/// (`used_keys`). The pre-assigned group index keeps batch members apart;
/// this check is the second net, catching names held by files outside the
/// batch or left over from an earlier partial run. The chosen name's key
/// is inserted into `used_keys` before returning.
pub fn find_available_name<F>(
    start_index: usize,
    old_path: &Path,
    dir: &Path,
    used_keys: &mut HashSet<String>,
    mut render: F,
) -> (String, String)
where
    F: FnMut(&str) -> String,
{
    let mut index = start_index;
    loop {
        let suffix = suffix_for_index(index);
        let name = render(&suffix);
        let candidate = dir.join(&name);
        let key = destination_key(&candidate);
        let free_on_disk = candidate == old_path || !candidate.exists();
        if free_on_disk && !used_keys.contains(&key) {
            used_keys.insert(key);
            return (name, suffix);
        }
        index += 1;
    }
}
