use crate::types::Frame;
use crate::video::VideoSource;
use anyhow::{anyhow, Context, Result};
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};
use tracing::{info, warn};

/// Physical webcam opened through nokhwa.
pub struct CameraSource {
    index: u32,
    camera: Option<Camera>,
}

impl CameraSource {
    pub fn new(index: u32) -> Self {
        Self { index, camera: None }
    }
}

impl VideoSource for CameraSource {
    fn name(&self) -> String {
        match &self.camera {
            Some(camera) => camera.info().human_name(),
            None => format!("Camera #{}", self.index),
        }
    }

    fn open(&mut self) -> Result<()> {
        if self.camera.is_some() {
            return Ok(());
        }
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(self.index), requested)
            .context("Failed to create camera instance")?;
        camera
            .open_stream()
            .map_err(|e| anyhow!(e))
            .context("Failed to open camera stream")?;

        info!("Opened camera: {} ({})", camera.info().human_name(), camera.camera_format());
        self.camera = Some(camera);
        Ok(())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        let camera = self.camera.as_ref()?;
        let res = camera.resolution();
        (res.width() > 0 && res.height() > 0).then(|| (res.width(), res.height()))
    }

    fn capture(&mut self) -> Result<Frame> {
        let camera = self.camera.as_mut().context("Camera is not open")?;
        let frame = camera.frame().map_err(|e| anyhow!(e)).context("Failed to get frame")?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| anyhow!(e))
            .context("Failed to decode frame")?;
        let (width, height) = (decoded.width(), decoded.height());
        Frame::from_raw(width, height, decoded.into_raw()).context("Decoded frame has the wrong size")
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                warn!("Camera stream did not stop cleanly: {}", e);
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// (index, human readable name) for every camera the OS reports.
pub fn list_cameras() -> Result<Vec<(String, String)>> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| anyhow!(e))?;
    Ok(cameras
        .into_iter()
        .map(|cam| (cam.index().to_string(), cam.human_name()))
        .collect())
}
