//! 存储模块
//!
//! 持久化由外部项目服务负责，这里提供接口定义和 HTTP 客户端。

pub mod http;
pub mod project;

pub use http::HttpProjectService;
pub use project::{
    ProjectService, SegmentData, SegmentRequest, ServiceStatus, SetMatchesRequest,
    SetTargetRequest, STATUS_SUCCESS,
};
