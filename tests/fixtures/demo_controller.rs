use crate::demo::dto::{BaseRepresentationModel, InputDto, OutputDto};
use crate::http::{ApiError, HttpRequest, Json, ResponseEntity};

/// A handler class.
#[rest_controller]
#[request_mapping(value = "/serverPath", produces = "application/json")]
pub struct DemoRestController;

impl DemoRestController {
    #[post_mapping(name = "Post Demo", value = "postActionControllerPath", consumes = "text/xml")]
    pub fn post_action_controller(
        &self,
        #[request_body] input: InputDto,
        request: HttpRequest,
    ) -> ResponseEntity<OutputDto> {
        ResponseEntity::ok(OutputDto::from(input))
    }

    /// A comment for get demo
    #[get_mapping(name = "Get Demo", value = "getActionController/{textValueVarName}/path")]
    pub fn get_action_controller(
        &self,
        #[path_variable("textValueVarName")] text_value: String,
        #[request_param(default_value = "0")] num_value: i32,
        request: HttpRequest,
    ) -> Result<Json<OutputDto>, ApiError> {
        Err(ApiError::NotFound)
    }

    #[put_mapping(name = "Put Demo", value = "putActionControllerPath")]
    pub fn put_action_controller(&self) -> ResponseEntity<BaseRepresentationModel> {
        ResponseEntity::no_content()
    }

    #[delete_mapping(name = "Delete Demo", value = "deleteActionControllerPath")]
    #[check_before("rightForDelete")]
    #[check_before("alternateRightForDelete")]
    pub fn delete_action_controller(&self) -> ResponseEntity<BaseRepresentationModel> {
        ResponseEntity::no_content()
    }

    #[patch_mapping(name = "Patch Demo", value = "patchActionControllerPath")]
    #[check_before("rightForPatch", "anotherRightForPatch")]
    pub fn patch_action_controller(&self) -> ResponseEntity<BaseRepresentationModel> {
        ResponseEntity::no_content()
    }

    fn audit(&self, request: &HttpRequest) {}
}
