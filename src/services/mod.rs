//! Services used by the kiosk screens

pub mod events;
pub mod labels;
pub mod qr_camera;

pub use events::{EventEmitter, HandlerId};
pub use labels::{CheckinLabel, parse_labels};
pub use qr_camera::{
    ChannelFrameSource, FrameSource, ImageFrame, QrCameraService, QrCode, QrDecoder, QrLocation,
    QrPoint, Rect, ScanOverlay, TextPayloadDecoder, target_box,
};
