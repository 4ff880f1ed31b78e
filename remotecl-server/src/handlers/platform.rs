//! Platform enumeration and queries.

use crate::error::ServerError;
use crate::instance::ServerInstance;
use crate::native::NativeBackend;
use remotecl_protocol::packets::platform::{GetPlatformIds, GetPlatformInfo};
use remotecl_protocol::packets::IdListPacket;
use remotecl_protocol::payload::Payload;

impl<B: NativeBackend> ServerInstance<B> {
    pub(crate) async fn send_platform_list(&mut self) -> Result<(), ServerError> {
        self.stream.recv::<GetPlatformIds>().await?;

        let platforms = match self.backend.platform_ids() {
            Ok(platforms) => platforms,
            Err(code) => return self.reply_error(code).await,
        };

        let ids = self.ids_for(&platforms)?;
        self.stream.send(&IdListPacket { ids }).await?;
        Ok(())
    }

    pub(crate) async fn get_platform_info(&mut self) -> Result<(), ServerError> {
        let query = self.stream.recv::<GetPlatformInfo>().await?;
        let platform = self.handles.get(query.id);

        match self.backend.platform_info(platform, query.param) {
            Ok(reply) => {
                self.stream.send(&Payload::<u32>::new(reply)).await?;
                Ok(())
            }
            Err(code) => self.reply_error(code).await,
        }
    }
}
