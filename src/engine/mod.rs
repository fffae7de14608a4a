pub mod cart;
pub mod dispatch;
pub mod lifecycle;
pub mod locks;
pub mod pricing;
pub mod stats;

#[cfg(test)]
pub(crate) mod fixtures;
