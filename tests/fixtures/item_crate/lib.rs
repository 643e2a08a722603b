pub mod model;
pub mod service;

pub mod generated {
    pub mod http;
    pub mod http_client;
    #[cfg(test)]
    mod http_test;
}

#[cfg(test)]
mod round_trip;
