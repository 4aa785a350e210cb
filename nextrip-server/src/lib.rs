//! NexTrip API wrapper and demo server.
//!
//! A cached client for Metro Transit's NexTrip real-time departures API,
//! and a small web server that republishes it as JSON. The server can also
//! answer "how long until the next bus?" from route, stop and direction
//! names.

pub mod cache;
pub mod cli;
pub mod demo;
pub mod nextrip;
pub mod web;
