use super::EnvironmentStore;

/// Expands `$NAME` and `${NAME}` against `store`. Unknown names expand to
/// nothing; a `$` not followed by a name is kept literally.
pub fn expand_vars(input: &str, store: &EnvironmentStore) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(dollar_pos) = rest.find('$') {
        result.push_str(&rest[..dollar_pos]);
        let after = &rest[dollar_pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(close) = braced.find('}') {
                result.push_str(store.get(&braced[..close]).unwrap_or(""));
                rest = &braced[close + 1..];
                continue;
            }
        }

        let var_end = after
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .unwrap_or(after.len());

        if var_end == 0 {
            result.push('$');
        } else {
            result.push_str(store.get(&after[..var_end]).unwrap_or(""));
        }
        rest = &after[var_end..];
    }

    result.push_str(rest);
    result
}
