// UI module - GUI logic and event loop bridge
//
// This module contains:
// - EventLoopBridge: Coordinates between tokio async runtime and Slint event loop
// - GuiController: Main controller that wires up the window with state and services
// - view: toolkit-independent panel presentations computed from state

pub mod bridge;
pub mod controller;
pub mod view;

pub use bridge::{EventLoopBridge, EventLoopBridgeHandle};
pub use controller::GuiController;
