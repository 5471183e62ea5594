mod flight;

pub use flight::FlightTelemetry;
