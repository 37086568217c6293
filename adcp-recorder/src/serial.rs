//! The serial transport seam. The pipeline only sees the two traits here;
//! production code plugs in `serialport`, tests plug in scripted sources.
//! The source is pure transport: no parsing, no interpretation of bytes.

use adcp_common::config::{ByteSize, Config, Parity, StopBits};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("serial device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("permission denied on serial device: {0}")]
    PermissionDenied(String),
    #[error("serial device held by another process: {0}")]
    DeviceBusy(String),
    #[error("serial device lost: {0}")]
    DeviceLost(String),
}

/// A lazily read byte stream. `Ok` with an empty chunk means the read
/// timed out, not end-of-stream.
pub trait ByteSource: Send {
    fn read_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>, SerialError>;

    /// Releases the handle; also happens on drop, and is idempotent.
    fn close(&mut self) {}
}

/// Opens (and re-opens, after disconnects) the configured device.
pub trait SerialOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn ByteSource>, SerialError>;
}

/// The production opener over the `serialport` crate.
pub struct SerialPortOpener {
    port: String,
    baud_rate: u32,
    byte_size: ByteSize,
    parity: Parity,
    stop_bits: StopBits,
    read_timeout: Duration,
    rts_cts: bool,
    xon_xoff: bool,
}

impl SerialPortOpener {
    pub fn from_config(config: &Config) -> SerialPortOpener {
        if config.dsr_dtr {
            warn!("dsr_dtr flow control is not supported by the serial backend; ignoring");
        }
        SerialPortOpener {
            port: config.serial_port.clone(),
            baud_rate: config.baud_rate,
            byte_size: config.byte_size,
            parity: config.parity,
            stop_bits: config.stop_bits,
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            rts_cts: config.rts_cts,
            xon_xoff: config.xon_xoff,
        }
    }

    fn data_bits(&self) -> serialport::DataBits {
        match self.byte_size {
            ByteSize::Five => serialport::DataBits::Five,
            ByteSize::Six => serialport::DataBits::Six,
            ByteSize::Seven => serialport::DataBits::Seven,
            ByteSize::Eight => serialport::DataBits::Eight,
        }
    }

    fn parity(&self) -> serialport::Parity {
        match self.parity {
            Parity::None | Parity::Mark | Parity::Space => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
        }
    }

    fn stop_bits(&self) -> serialport::StopBits {
        match self.stop_bits {
            StopBits::One => serialport::StopBits::One,
            // The backend has no 1.5-stop-bit setting; two is the closest
            // the hardware will honour.
            StopBits::OnePointFive | StopBits::Two => serialport::StopBits::Two,
        }
    }

    fn flow_control(&self) -> serialport::FlowControl {
        if self.rts_cts {
            serialport::FlowControl::Hardware
        } else if self.xon_xoff {
            serialport::FlowControl::Software
        } else {
            serialport::FlowControl::None
        }
    }
}

impl SerialOpener for SerialPortOpener {
    fn open(&self) -> Result<Box<dyn ByteSource>, SerialError> {
        if matches!(self.parity, Parity::Mark | Parity::Space) {
            warn!(parity = %self.parity, "mark/space parity unsupported by the backend; using none");
        }
        let port = serialport::new(&self.port, self.baud_rate)
            .data_bits(self.data_bits())
            .parity(self.parity())
            .stop_bits(self.stop_bits())
            .flow_control(self.flow_control())
            .timeout(self.read_timeout)
            .open()
            .map_err(|err| map_open_error(&self.port, err))?;
        Ok(Box::new(SerialPortSource { port: Some(port) }))
    }
}

fn map_open_error(port: &str, err: serialport::Error) -> SerialError {
    use serialport::ErrorKind;
    let detail = format!("{port}: {err}");
    match err.kind() {
        ErrorKind::NoDevice => SerialError::DeviceUnavailable(detail),
        ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
            SerialError::PermissionDenied(detail)
        }
        ErrorKind::Io(std::io::ErrorKind::AddrInUse) => SerialError::DeviceBusy(detail),
        _ => SerialError::DeviceUnavailable(detail),
    }
}

struct SerialPortSource {
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl ByteSource for SerialPortSource {
    fn read_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>, SerialError> {
        let Some(port) = self.port.as_mut() else {
            return Err(SerialError::DeviceLost("handle already closed".into()));
        };
        let mut buf = vec![0u8; max_bytes];
        match port.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(err) if err.kind() == std::io::ErrorKind::TimedOut => Ok(Vec::new()),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => Ok(Vec::new()),
            Err(err) => Err(SerialError::DeviceLost(err.to_string())),
        }
    }

    fn close(&mut self) {
        self.port = None;
    }
}

/// One enumerated serial device, for the control surface.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
}

pub fn list_ports() -> Result<Vec<PortInfo>, SerialError> {
    let ports = serialport::available_ports()
        .map_err(|err| SerialError::DeviceUnavailable(err.to_string()))?;
    Ok(ports
        .into_iter()
        .map(|p| PortInfo {
            kind: match p.port_type {
                serialport::SerialPortType::UsbPort(_) => "usb".to_owned(),
                serialport::SerialPortType::PciPort => "pci".to_owned(),
                serialport::SerialPortType::BluetoothPort => "bluetooth".to_owned(),
                serialport::SerialPortType::Unknown => "unknown".to_owned(),
            },
            name: p.port_name,
        })
        .collect())
}
