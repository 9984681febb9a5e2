use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
    config::ClientConfig,
    decode,
    error::Result,
    net::{IoError, TcpConnector},
    registers::{SigenRegister, UnitId},
    session::Session,
    transport::{Connector, ModbusTransport},
    types::{Kilowatts, OperatingMode, Percent, PowerFlow, PvString},
};

/// Every quantity the client can read, taken one after the other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub operating_mode: OperatingMode,
    pub grid_sensor_connected: bool,
    pub grid: PowerFlow,
    pub on_grid: bool,
    pub battery_soc: Percent,
    pub battery: PowerFlow,
    pub model_type: u16,
    pub pv_strings: [Kilowatts; 4],
    pub total_pv_power: Kilowatts,
}

/// You can create a SigenStorClient over TCP with [`SigenStorClient::connect`], or over any [`Connector`].
///
/// For its methods, we generally use the nomenclature that "get" reads back a configuration or status value,
/// "read" gets a measured value and "set"/"enable"/"disable" write a configuration.
///
/// Every call is a fresh round trip to the device. Nothing is cached and nothing is retried. Methods take
/// `&mut self`, so one client is used from one thread at a time.
pub struct SigenStorClient<C: Connector + Clone> {
    /// Unit 1.
    inverter: Session<C>,
    /// Unit 247.
    plant: Session<C>,
}

impl SigenStorClient<TcpConnector> {
    /// Create a client for `host:port` with the default configuration.
    ///
    /// With the defaults no connection is made until the first call.
    pub fn connect(host: impl Into<String>, port: u16) -> Result<Self, IoError> {
        Self::with_config(host, port, &ClientConfig::default())
    }

    /// Create a client for `host` on the standard Modbus TCP port, see [`DEFAULT_PORT`](crate::config::DEFAULT_PORT).
    pub fn connect_default_port(host: impl Into<String>) -> Result<Self, IoError> {
        Self::from_connector(TcpConnector::with_default_port(host), &ClientConfig::default())
    }

    pub fn with_config(host: impl Into<String>, port: u16, config: &ClientConfig) -> Result<Self, IoError> {
        let connector = TcpConnector::new(host, port).with_timeout(config.timeout());
        Self::from_connector(connector, config)
    }
}

impl<C: Connector + Clone> SigenStorClient<C> {
    /// Create a client whose two sessions both connect through `connector`.
    ///
    /// If `config.eager_connect` is set both sessions are opened here, and failure is an
    /// [`Error::Connection`](crate::error::Error::Connection).
    pub fn from_connector(connector: C, config: &ClientConfig) -> Result<Self, C::Error> {
        let mut client = Self {
            inverter: Session::new(connector.clone(), UnitId::Inverter.into(), config.session_mode),
            plant: Session::new(connector, UnitId::Plant.into(), config.session_mode),
        };
        if config.eager_connect {
            client.inverter.probe()?;
            client.plant.probe()?;
        }
        Ok(client)
    }

    /// The connector both sessions open their links through.
    pub fn connector(&self) -> &C {
        self.plant.connector()
    }

    /// Drop any open links. The next call reconnects.
    pub fn close(&mut self) {
        self.inverter.close();
        self.plant.close();
    }

    /// Return the EMS operating mode.
    ///
    /// Codes missing from the documentation give [`OperatingMode::Unknown`].
    pub fn get_operating_mode(&mut self) -> Result<OperatingMode, C::Error> {
        let [raw] = self.read_register(SigenRegister::OperatingMode)?;
        Ok(decode::operating_mode(raw))
    }

    /// Whether the grid sensor is connected.
    pub fn is_grid_sensor_connected(&mut self) -> Result<bool, C::Error> {
        let [raw] = self.read_register(SigenRegister::GridSensorStatus)?;
        Ok(decode::grid_sensor_connected(raw))
    }

    /// Return both directions of grid power from a single read.
    pub fn read_grid_power_flow(&mut self) -> Result<PowerFlow, C::Error> {
        let regs = self.read_register(SigenRegister::GridActivePower)?;
        Ok(decode::grid_flow(regs))
    }

    /// Return the power currently exported to the grid. 0 kW while importing.
    pub fn read_power_to_grid(&mut self) -> Result<Kilowatts, C::Error> {
        Ok(self.read_grid_power_flow()?.outgoing)
    }

    /// Return the power currently imported from the grid. 0 kW while exporting.
    pub fn read_power_from_grid(&mut self) -> Result<Kilowatts, C::Error> {
        Ok(self.read_grid_power_flow()?.incoming)
    }

    /// Whether the system is connected to the grid.
    pub fn is_on_grid(&mut self) -> Result<bool, C::Error> {
        let [raw] = self.read_register(SigenRegister::GridStatus)?;
        Ok(decode::on_grid(raw))
    }

    /// Return both directions of battery power from a single read, rounded to 10 W.
    pub fn read_battery_power_flow(&mut self) -> Result<PowerFlow, C::Error> {
        let regs = self.read_register(SigenRegister::BatteryPower)?;
        Ok(decode::battery_flow(regs))
    }

    /// Return the power currently charging the battery. 0 kW while discharging.
    pub fn read_power_to_battery(&mut self) -> Result<Kilowatts, C::Error> {
        Ok(self.read_battery_power_flow()?.outgoing)
    }

    /// Return the power currently discharged from the battery. 0 kW while charging.
    pub fn read_power_from_battery(&mut self) -> Result<Kilowatts, C::Error> {
        Ok(self.read_battery_power_flow()?.incoming)
    }

    /// Returns the raw model type code of the inverter.
    ///
    /// All fifteen registers of the block are read, only the first is returned.
    pub fn get_model_type(&mut self) -> Result<u16, C::Error> {
        let regs: [u16; 15] = self.read_register(SigenRegister::ModelType)?;
        Ok(regs[0])
    }

    /// Return the battery state of charge.
    pub fn read_battery_soc(&mut self) -> Result<Percent, C::Error> {
        let [raw] = self.read_register(SigenRegister::BatterySoc)?;
        Ok(decode::battery_soc(raw))
    }

    /// Return the power of one PV string, rounded to 10 W.
    ///
    /// A string that is not physically connected reports nonsense values, so anything at or above
    /// [`decode::PV_STRING_PLAUSIBLE_LIMIT_KW`] is returned as 0 kW.
    pub fn read_pv_string_power(&mut self, string: PvString) -> Result<Kilowatts, C::Error> {
        let (first, second) = SigenRegister::pv_string(string);
        let [v1] = self.read_register(first)?;
        let [v2] = self.read_register(second)?;
        match decode::pv_string_power_checked(v1, v2) {
            Some(power) => Ok(power),
            None => {
                debug!(string = string.number(), v1, v2, "implausible PV string power, reporting 0 kW");
                Ok(Kilowatts::ZERO)
            }
        }
    }

    /// Return the sum of all four PV strings, each filtered individually.
    pub fn read_total_pv_power(&mut self) -> Result<Kilowatts, C::Error> {
        let strings = self.read_pv_strings()?;
        Ok(decode::total_pv_power(strings))
    }

    fn read_pv_strings(&mut self) -> Result<[Kilowatts; 4], C::Error> {
        let mut strings = [Kilowatts::ZERO; 4];
        for (slot, string) in strings.iter_mut().zip(PvString::iter()) {
            *slot = self.read_pv_string_power(string)?;
        }
        Ok(strings)
    }

    /// Read every quantity, in the same order as the individual getters would.
    pub fn read_snapshot(&mut self) -> Result<Snapshot, C::Error> {
        let operating_mode = self.get_operating_mode()?;
        let grid_sensor_connected = self.is_grid_sensor_connected()?;
        let grid = self.read_grid_power_flow()?;
        let on_grid = self.is_on_grid()?;
        let battery_soc = self.read_battery_soc()?;
        let battery = self.read_battery_power_flow()?;
        let model_type = self.get_model_type()?;
        let pv_strings = self.read_pv_strings()?;
        let total_pv_power = decode::total_pv_power(pv_strings);
        Ok(Snapshot {
            operating_mode,
            grid_sensor_connected,
            grid,
            on_grid,
            battery_soc,
            battery,
            model_type,
            pv_strings,
            total_pv_power,
        })
    }

    /// Hand control of the EMS to remote commands.
    pub fn enable_remote_ems_mode(&mut self) -> Result<(), C::Error> {
        self.write_register(SigenRegister::RemoteEmsEnable, 1)
    }

    pub fn disable_remote_ems_mode(&mut self) -> Result<(), C::Error> {
        self.write_register(SigenRegister::RemoteEmsEnable, 0)
    }

    /// Set the remote EMS control mode.
    ///
    /// Accepts a [`RemoteEmsControlMode`](crate::types::RemoteEmsControlMode) or a raw code. Codes are not
    /// checked here, a code the device does not accept is rejected by the device.
    pub fn set_remote_ems_control_mode(&mut self, mode: impl Into<u16>) -> Result<(), C::Error> {
        self.write_register(SigenRegister::RemoteEmsControlMode, mode.into())
    }

    fn session(&mut self, unit: UnitId) -> &mut Session<C> {
        match unit {
            UnitId::Inverter => &mut self.inverter,
            UnitId::Plant => &mut self.plant,
        }
    }

    fn read_register<const N: usize>(&mut self, register: SigenRegister) -> Result<[u16; N], C::Error> {
        debug_assert_eq!(N, register.count() as usize);
        self.session(register.unit())
            .read_holding_registers::<N>(register.address())
    }

    fn write_register(&mut self, register: SigenRegister, value: u16) -> Result<(), C::Error> {
        self.session(register.unit())
            .write_single_register(register.address(), value)
    }
}
