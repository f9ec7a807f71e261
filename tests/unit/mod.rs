mod analysis;
mod functions;
mod gc;
mod imports;
mod types;
mod values;
