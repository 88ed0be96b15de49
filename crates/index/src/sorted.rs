//! Ordered-unique string lists.
//!
//! The root document (package names) and each package document (version
//! strings) are kept sorted by byte order with no duplicates, and are only
//! ever grown through [`insert_if_absent`].

/// Returns `sorted` with `value` inserted at its ordered position, or an
/// unchanged copy if `value` is already present.
///
/// `sorted` must already be sorted and free of duplicates. The input is
/// never modified.
///
/// ```
/// use pkgkv_index::insert_if_absent;
///
/// let packages = vec!["foo".to_string()];
/// let packages = insert_if_absent(&packages, "bar");
/// assert_eq!(packages, ["bar", "foo"]);
/// assert_eq!(insert_if_absent(&packages, "foo"), packages);
/// ```
#[must_use]
pub fn insert_if_absent(sorted: &[String], value: &str) -> Vec<String> {
    match sorted.binary_search_by(|probe| probe.as_str().cmp(value)) {
        Ok(_) => sorted.to_vec(),
        Err(index) => {
            let mut inserted = Vec::with_capacity(sorted.len() + 1);
            inserted.extend_from_slice(&sorted[..index]);
            inserted.push(value.to_string());
            inserted.extend_from_slice(&sorted[index..]);
            inserted
        },
    }
}
