//! 리소스 레지스트리 — 시나리오 중 생성된 페이지 객체의 역순 해제
//!
//! [`ResourceRegistry`]는 생성 순서대로 페이지 객체를 기록하고
//! 시나리오 종료 시 역순으로 해제합니다. 해제는 best-effort입니다:
//! 하나가 실패해도 나머지 리소스는 모두 해제 시도를 받습니다.

use serde::Serialize;
use tracing::{debug, error};

use crate::error::{DriverError, ResourceError};
use crate::types::ElementHandle;

/// 페이지 객체가 노출하는 UI 요소
pub trait PageElement {
    /// 드라이버에 전달할 요소 핸들
    fn handle(&self) -> ElementHandle;

    /// 요소가 화면에 표시되는지 여부
    fn is_displayed(&self) -> Result<bool, DriverError>;
}

/// 시나리오 범위의 페이지 객체
pub trait PageObject {
    /// 로그와 해제 보고에 쓰이는 이름
    fn name(&self) -> &str;

    /// 이름으로 요소를 조회합니다. 기본값은 요소 없음.
    fn element(&self, _name: &str) -> Option<&dyn PageElement> {
        None
    }

    /// 페이지 객체가 잡고 있는 리소스를 해제합니다.
    fn release(&mut self) -> Result<(), DriverError>;
}

/// 역순 해제 결과
#[derive(Debug, Default, Serialize)]
pub struct ReleaseReport {
    /// 해제에 성공한 리소스 이름 (해제 순서)
    pub released: Vec<String>,
    /// 해제 실패
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<ResourceError>,
}

impl ReleaseReport {
    /// 해제 시도 총 수
    pub fn attempted(&self) -> usize {
        self.released.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn serialize_failures<S>(failures: &[ResourceError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(failures.iter().map(ToString::to_string))
}

/// 시나리오 하나의 페이지 객체 레지스트리
///
/// 삽입 순서가 곧 생성 순서입니다.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: Vec<Box<dyn PageObject>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 페이지 객체를 등록합니다.
    pub fn register(&mut self, resource: Box<dyn PageObject>) {
        debug!(resource = %resource.name(), position = self.resources.len(), "page object registered");
        self.resources.push(resource);
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// 등록된 이름 목록 (생성 순서)
    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name()).collect()
    }

    /// 이름으로 요소를 찾습니다. 가장 최근에 등록된 페이지 객체부터 검색합니다.
    pub fn find_element(&self, name: &str) -> Option<&dyn PageElement> {
        self.resources.iter().rev().find_map(|r| r.element(name))
    }

    /// 모든 리소스를 생성 역순으로 해제하고 레지스트리를 비웁니다.
    ///
    /// 개별 실패는 로그로 남기고 보고에 모으며, 전파하지 않습니다.
    pub fn drain_reverse(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();

        while let Some(mut resource) = self.resources.pop() {
            let name = resource.name().to_owned();
            match resource.release() {
                Ok(()) => {
                    debug!(resource = %name, "page object released");
                    metrics::counter!(crate::metrics::RESOURCES_RELEASED_TOTAL).increment(1);
                    report.released.push(name);
                }
                Err(e) => {
                    error!(resource = %name, error = %e, "failed to release page object");
                    metrics::counter!(crate::metrics::RESOURCE_RELEASE_FAILURES_TOTAL)
                        .increment(1);
                    report.failures.push(ResourceError::ReleaseFailed {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.names())
            .finish()
    }
}
