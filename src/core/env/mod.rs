mod expand;
mod vars;

pub use expand::expand_vars;
pub use vars::EnvironmentStore;

/// Returns true when `name` is usable as an environment variable name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains('\0')
}
