//! Device enumeration and queries.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::NativeBackend;
use remotecl_protocol::packets::device::{GetDeviceIds, GetDeviceInfo};
use remotecl_protocol::packets::IdListPacket;

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn send_device_list(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetDeviceIds>().await?;
        let platform = self.handles.get(query.platform_id);

        let devices = match self.backend.device_ids(platform, query.device_type) {
            Ok(devices) => devices,
            Err(code) => return self.reply_error(code).await,
        };

        let ids = self.ids_for(&devices)?;
        self.stream.send(&IdListPacket { ids }).await?;
        Ok(())
    }

    pub(crate) async fn get_device_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetDeviceInfo>().await?;
        let device = self.handles.get(query.id);

        match self.backend.device_info(device, query.param) {
            Ok(info) => self.reply_info(info).await,
            Err(code) => self.reply_error(code).await,
        }
    }
}
