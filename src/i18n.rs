use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Zh,
    En,
}

/// Every user-facing string the form produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    EnterFieldName,
    SelectRefEntity,
    SelectClassification,
    SelectStateClass,
    FieldAdded,
    User,
    Department,
    DetailEntity,
    NoEntityAvailable,
    NoClassificationAvailable,
    Submitting,
    Loading,
    FormTitle,
    FieldLabel,
    FieldType,
    Comments,
    RefEntity,
    RefClassification,
    StateClass,
    StateClassHint,
    SaveAndNew,
    Save,
    SubmitFailed,
}

impl Lang {
    pub fn text(self, msg: Msg) -> &'static str {
        use Msg::*;
        match self {
            Lang::Zh => match msg {
                EnterFieldName => "请输入字段名称",
                SelectRefEntity => "请选择引用实体",
                SelectClassification => "请选择分类数据",
                SelectStateClass => "请选择状态类 (Enum)",
                FieldAdded => "字段已添加",
                User => "用户",
                Department => "部门",
                DetailEntity => "明细实体",
                NoEntityAvailable => "无可用实体",
                NoClassificationAvailable => "无可用分类数据",
                Submitting => "请稍后",
                Loading => "加载中",
                FormTitle => "添加字段",
                FieldLabel => "字段名称",
                FieldType => "字段类型",
                Comments => "备注",
                RefEntity => "引用实体",
                RefClassification => "分类数据",
                StateClass => "状态类 (Enum)",
                StateClassHint => "留空使用 HowtoState",
                SaveAndNew => "保存并继续添加",
                Save => "确定",
                SubmitFailed => "提交失败",
            },
            Lang::En => match msg {
                EnterFieldName => "Please enter a field name",
                SelectRefEntity => "Please select a reference entity",
                SelectClassification => "Please select classification data",
                SelectStateClass => "Please select a state class (Enum)",
                FieldAdded => "Field added",
                User => "User",
                Department => "Department",
                DetailEntity => "Detail entity",
                NoEntityAvailable => "No entity available",
                NoClassificationAvailable => "No classification data available",
                Submitting => "Please wait",
                Loading => "Loading",
                FormTitle => "New field",
                FieldLabel => "Field name",
                FieldType => "Field type",
                Comments => "Comments",
                RefEntity => "Reference entity",
                RefClassification => "Classification",
                StateClass => "State class (Enum)",
                StateClassHint => "blank uses HowtoState",
                SaveAndNew => "Save and add another",
                Save => "Save",
                SubmitFailed => "Submit failed",
            },
        }
    }
}
