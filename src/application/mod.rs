// Application layer - Simulation and orchestration use cases
pub mod alert_monitor;
pub mod channel_simulator;
pub mod random_source;
pub mod telemetry_engine;
pub mod waveform_generator;
