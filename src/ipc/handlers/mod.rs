pub mod activities;
pub mod attendance;
pub mod auth;
pub mod behavior;
pub mod calendar;
pub mod core;
pub mod grades;
pub mod nav;
pub mod payments;
pub mod prefs;
pub mod staff;
pub mod students;
