pub type TubeParams = tube_axum::params::RestParams;
