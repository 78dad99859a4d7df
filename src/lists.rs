/// True if `value` occurs in `list`
pub fn contains<T: PartialEq>(value: &T, list: &[T]) -> bool {
    list.iter().any(|item| item == value)
}

/// Append `value` unless it is already present
pub fn add_uniquely<T: PartialEq>(value: T, mut list: Vec<T>) -> Vec<T> {
    if !contains(&value, &list) {
        list.push(value);
    }
    list
}

/// Copy of `list` without the first occurrence of `value`.
///
/// Values are assumed to occur at most once; later duplicates are kept.
pub fn remove_from<T: PartialEq + Clone>(value: &T, list: &[T]) -> Vec<T> {
    match list.iter().position(|item| item == value) {
        Some(index) => remove_at(index, list),
        None => list.to_vec(),
    }
}

/// Copy of `list` without the element at `position`.
///
/// A position at or past the end keeps only the elements before it.
pub fn remove_at<T: Clone>(position: usize, list: &[T]) -> Vec<T> {
    let mut result: Vec<T> = list[..position.min(list.len())].to_vec();
    if position < list.len() {
        result.extend_from_slice(&list[position + 1..]);
    }
    result
}
