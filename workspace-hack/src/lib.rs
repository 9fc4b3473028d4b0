// Generated by cargo-hakari. Do not edit by hand.
