pub mod app;
pub mod calibration_screen;
pub mod camera_controls;
pub mod experiment_screen;
pub mod fog_map;
pub mod mission_screen;
pub mod profiling_screen;
pub mod settings_modal;
pub mod stats_panel;
pub mod story_screen;
