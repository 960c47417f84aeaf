pub mod components;
pub mod execution;
pub mod types;

#[cfg(test)]
mod tests;
