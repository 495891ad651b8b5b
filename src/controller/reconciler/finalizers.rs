//! # Finalizers
//!
//! Set semantics over the ordered finalizer list of an object.
//! Only identity matters; order of other controllers' markers is preserved.

#[must_use]
pub fn contains(finalizers: &[String], marker: &str) -> bool {
    finalizers.iter().any(|f| f == marker)
}

/// Append `marker` unless already present
pub fn add(finalizers: &mut Vec<String>, marker: &str) {
    if !contains(finalizers, marker) {
        finalizers.push(marker.to_string());
    }
}

/// Drop every entry equal to `marker`
pub fn remove(finalizers: &mut Vec<String>, marker: &str) {
    finalizers.retain(|f| f != marker);
}
