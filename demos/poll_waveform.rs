use hds200ctrl::{Hds200, Oscilloscope, ScopeChannel, DEFAULT_BAUDRATE, DEFAULT_TTY};

#[tokio::main]
async fn main() -> hds200ctrl::Result<()> {
    let mut device = Hds200::open(DEFAULT_TTY, DEFAULT_BAUDRATE).await?;

    // The queue handle can be moved to another task to consume the data.
    let pending = device.pending_waveforms();

    device.enable_channel(ScopeChannel::Ch1).await?;
    device.start();

    loop {
        if !device.acquire_data().await? {
            println!("NO_DATA");
            continue;
        }
        for set in pending.drain() {
            // Each set contains one record per acquired channel.
            set.records.iter().for_each(|r| {
                println!(
                    "{}: {} samples, {} fs apart",
                    r.channel,
                    r.samples.len(),
                    r.interval_fs
                );
            })
        }
    }
}
