//! Dotted-path access to per-server documents.
//!
//! A path such as `config.boosts.channel` addresses a leaf inside nested
//! tables. Setting creates the intermediate tables; unsetting removes the leaf
//! and prunes tables it leaves empty.

use toml::{Table, Value};

use crate::error::StoreError;

/// Navigate a table by dotted path.
pub fn get_path<'a>(table: &'a Table, dotted_path: &str) -> Option<&'a Value> {
    let (parents, leaf) = split(dotted_path);
    let mut current = table;
    for segment in parents {
        current = current.get(segment)?.as_table()?;
    }
    current.get(leaf)
}

/// Set `dotted_path` to `value`, creating intermediate tables as needed.
///
/// Fails without modifying `table` if an intermediate key holds a non-table value.
pub fn set_path(table: &mut Table, dotted_path: &str, value: Value) -> Result<(), StoreError> {
    let (parents, leaf) = split(dotted_path);

    // Check the whole chain first so a conflict never leaves half-built tables.
    let mut cursor = Some(&*table);
    for segment in &parents {
        cursor = match cursor.and_then(|t| t.get(*segment)) {
            Some(Value::Table(t)) => Some(t),
            Some(_) => {
                return Err(StoreError::PathConflict {
                    path: dotted_path.into(),
                });
            }
            None => None,
        };
    }

    let mut current = table;
    for segment in parents {
        current = match current
            .entry(segment)
            .or_insert_with(|| Value::Table(Table::new()))
        {
            Value::Table(t) => t,
            _ => {
                return Err(StoreError::PathConflict {
                    path: dotted_path.into(),
                });
            }
        };
    }
    current.insert(leaf.to_string(), value);
    Ok(())
}

/// Remove the leaf at `dotted_path`. Returns the removed value, if any.
///
/// Removing an absent leaf is a no-op.
pub fn unset_path(table: &mut Table, dotted_path: &str) -> Option<Value> {
    let (parents, leaf) = split(dotted_path);
    remove_recursive(table, &parents, leaf)
}

fn remove_recursive(table: &mut Table, parents: &[&str], leaf: &str) -> Option<Value> {
    let Some((first, rest)) = parents.split_first() else {
        return table.remove(leaf);
    };
    let child = table.get_mut(*first)?.as_table_mut()?;
    let removed = remove_recursive(child, rest, leaf);
    if removed.is_some() && child.is_empty() {
        table.remove(*first);
    }
    removed
}

fn split(dotted_path: &str) -> (Vec<&str>, &str) {
    match dotted_path.rsplit_once('.') {
        Some((parents, leaf)) => (parents.split('.').collect(), leaf),
        None => (Vec::new(), dotted_path),
    }
}
