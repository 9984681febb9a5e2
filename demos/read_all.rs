use std::env;

use sigenstor_modbus::{
    client::SigenStorClient,
    config::{ClientConfig, DEFAULT_PORT},
    types::PvString,
};
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

// Usage: read_all <host> [port] [config.toml]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = env::args().skip(1);
    let Some(host) = args.next() else {
        eprintln!("Usage: read_all <host> [port] [config.toml]");
        std::process::exit(1);
    };
    let port = args
        .next()
        .map(|p| p.parse().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);
    let config = match args.next() {
        Some(path) => ClientConfig::from_toml_file(&path).expect("Failed to load config"),
        None => ClientConfig::default(),
    };

    println!("Connecting to {host}:{port} ({:?})", config.session_mode);
    let mut client =
        SigenStorClient::with_config(host, port, &config).expect("Failed to connect to SigenStor");

    println!("Operating mode:        {}", client.get_operating_mode().unwrap());
    println!("Grid sensor connected: {}", client.is_grid_sensor_connected().unwrap());
    println!("Power to grid:         {}", client.read_power_to_grid().unwrap());
    println!("Power from grid:       {}", client.read_power_from_grid().unwrap());
    println!("On grid:               {}", client.is_on_grid().unwrap());
    println!("Battery SOC:           {}", client.read_battery_soc().unwrap());
    println!("Power to battery:      {}", client.read_power_to_battery().unwrap());
    println!("Power from battery:    {}", client.read_power_from_battery().unwrap());
    println!("Model type:            {}", client.get_model_type().unwrap());
    println!("Total PV power:        {}", client.read_total_pv_power().unwrap());
    for string in PvString::iter() {
        println!(
            "PV string {} power:    {}",
            string.number(),
            client.read_pv_string_power(string).unwrap()
        );
    }
}
