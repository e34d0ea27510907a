pub mod booking;
pub mod catalog;
pub mod config;
pub mod contact;
pub mod db;
pub mod gateway;
pub mod handlers;
pub mod mailer;
pub mod model;
pub mod pages;
pub mod pricing;
pub mod reconcile;
pub mod render;
pub mod server;
pub mod validate;
