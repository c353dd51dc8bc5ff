const PREAMBLE: &str = "Analyze the following system data and provide concise advice on potential \
performance issues, congestion, overload, or malicious activity.";

const CLOSING: &str = "Based on this data, identify any potential issues (high resource usage, \
unusual processes, potential malicious indicators) and provide concise, actionable advice. \
If everything looks normal, state that.";

/// Single user message embedding both report blocks verbatim.
pub fn build_prompt(system_text: &str, process_text: &str) -> String {
    let processes = if process_text.trim().is_empty() {
        "No process data available."
    } else {
        process_text.trim_end()
    };
    format!(
        "{PREAMBLE}\n\nSystem Information:\n{}\n\nRunning Processes:\n{}\n\n{CLOSING}",
        system_text.trim_end(),
        processes,
    )
}
