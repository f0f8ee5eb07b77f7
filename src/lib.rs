pub mod net;
pub mod policy;
pub mod sim;
pub mod trace;

#[cfg(test)]
mod test;
