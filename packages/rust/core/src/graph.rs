//! Mermaid rendering of a pipeline's static stage list.

use crate::pipeline::Pipeline;

const START: &str = "__start__";
const END: &str = "__end__";

/// Render `pipeline` as a Mermaid `graph TD` diagram.
pub fn to_mermaid(pipeline: &Pipeline) -> String {
    render(&pipeline.stage_names())
}

/// Render a linear chain `__start__ → stages… → __end__`.
pub fn render(stages: &[&str]) -> String {
    let chain: Vec<&str> = std::iter::once(START)
        .chain(stages.iter().copied())
        .chain(std::iter::once(END))
        .collect();

    let nodes = chain.iter().map(|&node| match node {
        START | END => format!("    {node}([{node}])"),
        stage => format!("    {stage}[{stage}]"),
    });
    let edges = chain
        .windows(2)
        .map(|pair| format!("    {} --> {}", pair[0], pair[1]));

    let mut lines = vec!["graph TD".to_string()];
    lines.extend(nodes);
    lines.extend(edges);
    lines.join("\n") + "\n"
}
