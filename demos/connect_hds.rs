use hds200ctrl::{Hds200, MeasurementType, Multimeter, DEFAULT_BAUDRATE, DEFAULT_TTY};

#[tokio::main]
async fn main() -> hds200ctrl::Result<()> {
    let mut device = Hds200::open(DEFAULT_TTY, DEFAULT_BAUDRATE).await?;
    eprintln!("Connected to: {}\n", device.ident().model);

    device.set_meter_mode(MeasurementType::DcVoltage).await?;
    if !device.set_meter_range("20").await? {
        eprintln!("Range 20 V not reached, staying on {}", device.meter_range().await?);
    }
    println!("Value: {} V", device.meter_value().await?);
    Ok(())
}
