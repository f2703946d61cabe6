/// Comment markers used by the supported platforms (`#` Huawei/H3C, `!` Cisco/Arista)
const COMMENT_MARKERS: [char; 2] = ['#', '!'];

/// Convert rendered text into the ordered list of commands it would send.
/// Blank and comment lines are dropped; surviving lines keep their order.
pub fn normalize_rendered_config(rendered: &str) -> Vec<String> {
    rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKERS))
        .map(str::to_string)
        .collect()
}
