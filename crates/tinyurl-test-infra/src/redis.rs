use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use typed_builder::TypedBuilder;

const REDIS_PORT: u16 = 6379;

#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisConfig {
    #[builder(default = "7.4".to_string(), setter(into))]
    tag: String,
    /// Enables `requirepass` on the server.
    #[builder(default, setter(strip_option, into))]
    password: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Test fixture for a disposable standalone Redis server.
///
/// The container is removed when the fixture is dropped.
pub struct RedisServer {
    container: ContainerAsync<GenericImage>,
    config: RedisConfig,
}

impl RedisServer {
    /// Starts a Redis container and waits until it accepts connections.
    pub async fn start(config: RedisConfig) -> Result<Self> {
        let image = GenericImage::new("redis", config.tag.as_str())
            .with_exposed_port(REDIS_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"));

        let container = match &config.password {
            Some(password) => {
                image
                    .with_cmd(["redis-server", "--requirepass", password.as_str()])
                    .start()
                    .await?
            }
            None => image.start().await?,
        };

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();
        // "localhost" may resolve to ::1 while the port is only mapped on IPv4.
        Ok(match host.as_str() {
            "localhost" => String::from("127.0.0.1"),
            _ => host,
        })
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(REDIS_PORT).await?)
    }

    /// `host:port` of the mapped server port.
    pub async fn addr(&self) -> Result<String> {
        Ok(format!("{}:{}", self.host().await?, self.port().await?))
    }

    /// Connection string for logical database `db`, including the password if one is set.
    pub async fn url(&self, db: u8) -> Result<String> {
        let addr = self.addr().await?;
        Ok(match &self.config.password {
            Some(password) => format!("redis://:{password}@{addr}/{db}"),
            None => format!("redis://{addr}/{db}"),
        })
    }
}
