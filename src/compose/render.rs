// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Compose descriptor and AWX settings rendering

use crate::constants::compose::{AWX_IMAGE, DATABASE_NAME, DATABASE_USER, POSTGRES_IMAGE, REDIS_IMAGE};
use crate::credentials::Credentials;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

pub const POSTGRES_SERVICE: &str = "postgres";
pub const REDIS_SERVICE: &str = "redis";
pub const WEB_SERVICE: &str = "awx_web";
pub const TASK_SERVICE: &str = "awx_task";

/// Port the AWX web container listens on
const WEB_CONTAINER_PORT: u16 = 8052;
const SETTINGS_MOUNT: &str = "./settings.py:/etc/tower/conf.d/credentials.py:ro";

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ComposeFile {
    pub services: BTreeMap<String, ComposeService>,
    pub volumes: BTreeMap<String, serde_yaml::Mapping>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ComposeService {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub restart: String,
}

/// Inputs for rendering a compose deployment
#[derive(Debug, Clone)]
pub struct ComposeSpec<'a> {
    pub awx_version: &'a str,
    pub web_port: u16,
    pub credentials: &'a Credentials,
}

fn awx_service(spec: &ComposeSpec<'_>, name: &str, launcher: &str) -> ComposeService {
    ComposeService {
        image: format!("{}:{}", AWX_IMAGE, spec.awx_version),
        container_name: Some(name.to_string()),
        hostname: Some(name.to_string()),
        user: Some("root".to_string()),
        command: Some(vec![launcher.to_string()]),
        environment: BTreeMap::from([
            ("AWX_ADMIN_USER".to_string(), spec.credentials.admin_user.clone()),
            ("SUPERVISOR_CONFIG_PATH".to_string(), "/etc/supervisord.conf".to_string()),
        ]),
        volumes: vec![
            SETTINGS_MOUNT.to_string(),
            "awx_projects:/var/lib/awx/projects".to_string(),
        ],
        restart: "unless-stopped".to_string(),
        ..Default::default()
    }
}

pub fn compose_file(spec: &ComposeSpec<'_>) -> ComposeFile {
    let mut services = BTreeMap::new();

    services.insert(
        POSTGRES_SERVICE.to_string(),
        ComposeService {
            image: POSTGRES_IMAGE.to_string(),
            container_name: Some("awx_postgres".to_string()),
            environment: BTreeMap::from([
                ("POSTGRES_DB".to_string(), DATABASE_NAME.to_string()),
                ("POSTGRES_USER".to_string(), DATABASE_USER.to_string()),
                ("POSTGRES_PASSWORD".to_string(), spec.credentials.database_password.clone()),
            ]),
            volumes: vec!["postgres_data:/var/lib/postgresql/data".to_string()],
            restart: "unless-stopped".to_string(),
            ..Default::default()
        },
    );

    services.insert(
        REDIS_SERVICE.to_string(),
        ComposeService {
            image: REDIS_IMAGE.to_string(),
            container_name: Some("awx_redis".to_string()),
            command: Some(vec!["redis-server".to_string(), "--appendonly".to_string(), "yes".to_string()]),
            restart: "unless-stopped".to_string(),
            ..Default::default()
        },
    );

    let mut web = awx_service(spec, WEB_SERVICE, "/usr/bin/launch_awx_web.sh");
    web.ports = vec![format!("{}:{}", spec.web_port, WEB_CONTAINER_PORT)];
    web.depends_on = vec![POSTGRES_SERVICE.to_string(), REDIS_SERVICE.to_string()];
    services.insert(WEB_SERVICE.to_string(), web);

    let mut task = awx_service(spec, TASK_SERVICE, "/usr/bin/launch_awx_task.sh");
    task.depends_on = vec![
        POSTGRES_SERVICE.to_string(),
        REDIS_SERVICE.to_string(),
        WEB_SERVICE.to_string(),
    ];
    services.insert(TASK_SERVICE.to_string(), task);

    ComposeFile {
        services,
        volumes: BTreeMap::from([
            ("postgres_data".to_string(), serde_yaml::Mapping::new()),
            ("awx_projects".to_string(), serde_yaml::Mapping::new()),
        ]),
    }
}

pub fn render_compose(spec: &ComposeSpec<'_>) -> Result<String> {
    Ok(serde_yaml::to_string(&compose_file(spec))?)
}

/// Python settings module mounted into both AWX containers
pub fn render_settings(credentials: &Credentials) -> String {
    format!(
        r#"# Generated by awx-install, rewritten on every compose installation.
SECRET_KEY = '{secret_key}'

DATABASES = {{
    'default': {{
        'ATOMIC_REQUESTS': True,
        'ENGINE': 'django.db.backends.postgresql',
        'NAME': '{db_name}',
        'USER': '{db_user}',
        'PASSWORD': '{db_password}',
        'HOST': '{db_host}',
        'PORT': '5432',
    }}
}}

BROKER_URL = 'redis://{redis_host}:6379'
CLUSTER_HOST_ID = 'awx'
"#,
        secret_key = credentials.secret_key,
        db_name = DATABASE_NAME,
        db_user = DATABASE_USER,
        db_password = credentials.database_password,
        db_host = POSTGRES_SERVICE,
        redis_host = REDIS_SERVICE,
    )
}
