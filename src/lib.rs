//! Server side of the Mulungu citizen portal: republishes the municipality's
//! news page as JSON for the portal's carousel.

pub mod models;
pub mod service;
