//! Integration flows across br-02, br-03 and br-04.

pub mod harness;

#[cfg(test)]
mod runtime;
#[cfg(test)]
mod scenarios;
