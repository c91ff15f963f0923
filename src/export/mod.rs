/// End-to-end export: render, encode within budget, name the artifact.
pub mod orchestrator;
