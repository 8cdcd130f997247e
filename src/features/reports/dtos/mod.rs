mod report_dto;

pub use report_dto::{
    AddPhotoDto, CreateReportDto, ReportQueryParams, ReportResponseDto, ReportSummaryDto,
    UpdateReportDto,
};
