pub mod arrival;
pub mod camera;
pub mod gps;
pub mod mystery;
pub mod path;
pub mod walk;

pub use arrival::ArrivalDetector;
pub use camera::MapView;
pub use gps::GpsTrack;
pub use path::VisitedPath;
pub use walk::{Guidance, VirtualWalk, WalkTarget};
